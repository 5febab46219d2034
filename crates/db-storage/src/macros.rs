// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

/// Creates a rust enum which maps onto a postgres enum type
///
/// Defines the diesel sql type `$sql_type` with the postgres type name `$sql_type_name`
/// and the enum `$name` with `ToSql`/`FromSql` implementations, [`std::str::FromStr`],
/// [`std::fmt::Display`] and an `as_str` function returning the database representation.
///
/// Example:
/// ```ignore,rust
/// sql_enum!(
///     #[derive(Serialize, Deserialize)]
///     #[serde(rename_all = "snake_case")]
///     Color,
///     "color",
///     ColorType,
///     {
///         Red = "red",
///         Blue = "blue",
///     }
/// );
/// ```
macro_rules! sql_enum {
    (
        $(#[$enum_meta:meta])*
        $name:ident,
        $sql_type_name:literal,
        $sql_type:ident,
        {
            $($variant:ident = $db_value:literal),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, diesel::sql_types::SqlType, diesel::query_builder::QueryId)]
        #[diesel(postgres_type(name = $sql_type_name))]
        pub struct $sql_type;

        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, diesel::FromSqlRow, diesel::AsExpression)]
        #[diesel(sql_type = $sql_type)]
        $(#[$enum_meta])*
        pub enum $name {
            $($variant),*
        }

        impl $name {
            /// Returns the database representation of the variant
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $db_value),*
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($db_value => Ok(Self::$variant),)*
                    _ => Err(format!("unknown {} {s:?}", $sql_type_name)),
                }
            }
        }

        impl diesel::serialize::ToSql<$sql_type, diesel::pg::Pg> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                use std::io::Write;

                out.write_all(self.as_str().as_bytes())?;
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<$sql_type, diesel::pg::Pg> for $name {
            fn from_sql(bytes: diesel::pg::PgValue<'_>) -> diesel::deserialize::Result<Self> {
                let value = std::str::from_utf8(bytes.as_bytes())?;

                value.parse().map_err(Into::into)
            }
        }
    };
}
