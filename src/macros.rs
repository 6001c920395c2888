//! Crate-wide helper macros

/// Builds `validator::ValidationErrors` from a field map:
/// `validation_errors!({"slug": ["slug" => "Slug already exists"]})`
#[macro_export]
macro_rules! validation_errors {
    ({$($field:tt: [$($code:tt => $value:expr),*]),*}) => {{
        let mut errors = ::validator::ValidationErrors::new();
        $($(
            let mut error = ::validator::ValidationError::new($code);
            error.message = Some(::std::borrow::Cow::from($value));
            errors.add($field, error);
        )*)*
        errors
    }};
}

/// Maps a fieldless enum to a VARCHAR column through its
/// lowercase string form.
#[macro_export]
macro_rules! impl_varchar_sql {
    ($name:ident { $($variant:ident => $value:tt),+ $(,)* }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match *self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::failure::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(format_err!("Unknown {} value: {}", stringify!($name), other)
                        .context(::errors::Error::Parse)
                        .into()),
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl ::diesel::serialize::ToSql<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $name {
            fn to_sql<W: ::std::io::Write>(
                &self,
                out: &mut ::diesel::serialize::Output<W, ::diesel::pg::Pg>,
            ) -> ::diesel::serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(::diesel::serialize::IsNull::No)
            }
        }

        impl ::diesel::deserialize::FromSql<::diesel::sql_types::VarChar, ::diesel::pg::Pg> for $name {
            fn from_sql(data: Option<&[u8]>) -> ::diesel::deserialize::Result<Self> {
                match data {
                    $(Some(v) if v == $value.as_bytes() => Ok($name::$variant),)+
                    Some(v) => Err(format!(
                        "Unrecognized enum variant: {:?}",
                        String::from_utf8(v.to_vec()).unwrap_or_else(|_| "Non - UTF8 value".to_string())
                    ).into()),
                    None => Err("Unexpected null for non-null column".into()),
                }
            }
        }
    };
}
