use super::TableModel;

pub const CABINS: &str = "cabins";
pub const GUESTS: &str = "guests";
pub const BOOKINGS: &str = "bookings";
pub const SETTINGS: &str = "settings";

/// Statically described admin table.
pub struct AdminTable {
    table_name: &'static str,
    create_table_sql: &'static str,
    columns: &'static [(&'static str, &'static str)],
}

impl TableModel for AdminTable {
    fn table_name(&self) -> &str {
        self.table_name
    }

    fn primary_key_field(&self) -> &str {
        "id"
    }

    fn get_create_table_sql(&self) -> &str {
        self.create_table_sql
    }

    fn column_type(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, sql_type)| *sql_type)
    }
}

impl AdminTable {
    pub fn cabins() -> Self {
        Self {
            table_name: CABINS,
            create_table_sql: r#"CREATE TABLE IF NOT EXISTS cabins (
                id BIGSERIAL PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                name TEXT NOT NULL,
                "maxCapacity" INTEGER NOT NULL,
                "regularPrice" INTEGER NOT NULL,
                discount INTEGER NOT NULL DEFAULT 0,
                description TEXT,
                image TEXT
            )"#,
            columns: &[
                ("id", "int8"),
                ("created_at", "timestamptz"),
                ("name", "text"),
                ("maxCapacity", "int4"),
                ("regularPrice", "int4"),
                ("discount", "int4"),
                ("description", "text"),
                ("image", "text"),
            ],
        }
    }

    pub fn guests() -> Self {
        Self {
            table_name: GUESTS,
            create_table_sql: r#"CREATE TABLE IF NOT EXISTS guests (
                id BIGSERIAL PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                "fullName" TEXT NOT NULL,
                email TEXT NOT NULL,
                "nationalID" TEXT,
                nationality TEXT,
                "countryFlag" TEXT
            )"#,
            columns: &[
                ("id", "int8"),
                ("created_at", "timestamptz"),
                ("fullName", "text"),
                ("email", "text"),
                ("nationalID", "text"),
                ("nationality", "text"),
                ("countryFlag", "text"),
            ],
        }
    }

    pub fn bookings() -> Self {
        Self {
            table_name: BOOKINGS,
            create_table_sql: r#"CREATE TABLE IF NOT EXISTS bookings (
                id BIGSERIAL PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                "startDate" TIMESTAMPTZ NOT NULL,
                "endDate" TIMESTAMPTZ NOT NULL,
                "numNights" INTEGER NOT NULL,
                "numGuests" INTEGER NOT NULL,
                "cabinPrice" DOUBLE PRECISION,
                "extrasPrice" DOUBLE PRECISION,
                "totalPrice" DOUBLE PRECISION NOT NULL,
                status TEXT NOT NULL DEFAULT 'unconfirmed',
                "hasBreakfast" BOOLEAN NOT NULL DEFAULT false,
                "isPaid" BOOLEAN NOT NULL DEFAULT false,
                observations TEXT,
                "cabinId" BIGINT REFERENCES cabins(id),
                "guestId" BIGINT REFERENCES guests(id)
            )"#,
            columns: &[
                ("id", "int8"),
                ("created_at", "timestamptz"),
                ("startDate", "timestamptz"),
                ("endDate", "timestamptz"),
                ("numNights", "int4"),
                ("numGuests", "int4"),
                ("cabinPrice", "float8"),
                ("extrasPrice", "float8"),
                ("totalPrice", "float8"),
                ("status", "text"),
                ("hasBreakfast", "bool"),
                ("isPaid", "bool"),
                ("observations", "text"),
                ("cabinId", "int8"),
                ("guestId", "int8"),
            ],
        }
    }

    pub fn settings() -> Self {
        Self {
            table_name: SETTINGS,
            create_table_sql: r#"CREATE TABLE IF NOT EXISTS settings (
                id BIGSERIAL PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                "minBookingLength" INTEGER NOT NULL,
                "maxBookingLength" INTEGER NOT NULL,
                "maxGuestsPerBooking" INTEGER NOT NULL,
                "breakfastPrice" DOUBLE PRECISION NOT NULL
            )"#,
            columns: &[
                ("id", "int8"),
                ("created_at", "timestamptz"),
                ("minBookingLength", "int4"),
                ("maxBookingLength", "int4"),
                ("maxGuestsPerBooking", "int4"),
                ("breakfastPrice", "float8"),
            ],
        }
    }
}
