use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CREATE_TABLES_SQL: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS weather_station.users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        username VARCHAR(255) NOT NULL UNIQUE,
        password VARCHAR NOT NULL,
        superuser BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS weather_station.sensors (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL UNIQUE,
        type weather_station.sensor_type NOT NULL DEFAULT 'environmental',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS weather_station.sensor_data (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        sensor_id UUID NOT NULL REFERENCES weather_station.sensors(id) ON DELETE CASCADE,
        temperature DOUBLE PRECISION NOT NULL,
        humidity DOUBLE PRECISION NOT NULL,
        pressure DOUBLE PRECISION NOT NULL,
        voltage DOUBLE PRECISION NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS weather_station.sensor_permissions (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES weather_station.users(id) ON DELETE CASCADE,
        sensor_id UUID NOT NULL REFERENCES weather_station.sensors(id) ON DELETE CASCADE,
        read BOOLEAN NOT NULL DEFAULT FALSE,
        write BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

        UNIQUE(user_id, sensor_id)
    )
    "#,
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS weather_station;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO weather_station, public;")
            .await?;

        // The application role owns everything created in the schema
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    GRANT ALL PRIVILEGES ON DATABASE weather TO weather;
                    GRANT ALL ON SCHEMA weather_station TO weather;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA weather_station GRANT ALL ON TABLES TO weather;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA weather_station GRANT ALL ON SEQUENCES TO weather;
                END $$;
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE weather_station.sensor_type AS ENUM ('environmental', 'state')",
            )
            .await?;

        for sql in CREATE_TABLES_SQL {
            manager.get_connection().execute_unprepared(sql).await?;
        }

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_sensor_data_sensor_created_at
                 ON weather_station.sensor_data(sensor_id, created_at)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in ["sensor_permissions", "sensor_data", "sensors", "users"] {
            manager
                .get_connection()
                .execute_unprepared(&format!("DROP TABLE IF EXISTS weather_station.{table}"))
                .await?;
        }

        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS weather_station.sensor_type")
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    ALTER DEFAULT PRIVILEGES IN SCHEMA weather_station REVOKE ALL ON SEQUENCES FROM weather;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA weather_station REVOKE ALL ON TABLES FROM weather;
                    REVOKE ALL ON SCHEMA weather_station FROM weather;
                    REVOKE ALL PRIVILEGES ON DATABASE weather FROM weather;
                END $$;
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS weather_station CASCADE;")
            .await?;

        Ok(())
    }
}
