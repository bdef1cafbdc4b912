/// Builds a [`Value`](crate::Value) from JSON-like syntax.
///
/// ```rust
/// use chunked_json::{value, Value};
///
/// let doc = value!({ "id": 1, "tags": ["a", "b"], "extra": null });
/// assert_eq!(doc.as_object().map(|o| o.len()), Some(3));
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::Map::new();
        $(
            object.insert($key.to_string(), $crate::value!($value));
        )*
        $crate::Value::Object(object)
    }};

    // Anything else goes through serde.
    ($s:expr) => {
        $crate::to_value(&$s).unwrap_or($crate::Value::Null)
    };
}

/// Implements [`JsonObject`](crate::JsonObject) and [`JsonWrite`](crate::JsonWrite)
/// for a struct, writing the listed fields in order.
///
/// A field is written under its own name unless renamed with `as "name"`.
///
/// ```rust
/// use chunked_json::{json_object, to_string};
///
/// struct Point {
///     x: i32,
///     y: i32,
///     label: String,
/// }
///
/// json_object!(Point { x, y, label as "name" });
///
/// let p = Point { x: 1, y: -2, label: "origin".to_string() };
/// assert_eq!(to_string(&p).unwrap(), r#"{"x":1,"y":-2,"name":"origin"}"#);
/// ```
#[macro_export]
macro_rules! json_object {
    (@name $field:ident) => {
        stringify!($field)
    };

    (@name $field:ident $rename:literal) => {
        $rename
    };

    ($ty:ty { $($field:ident $(as $rename:literal)?),* $(,)? }) => {
        impl $crate::JsonObject for $ty {
            fn member_count(&self) -> usize {
                <[&str]>::len(&[$(stringify!($field)),*])
            }

            fn member(&self, index: usize) -> Option<(&str, &dyn $crate::JsonWrite)> {
                // One constant per field, numbered by declaration order.
                #[allow(non_camel_case_types, dead_code)]
                enum Member {
                    $($field),*
                }
                $(
                    #[allow(non_upper_case_globals)]
                    const $field: usize = Member::$field as usize;
                )*
                match index {
                    $($field => Some(($crate::json_object!(@name $field $($rename)?), &self.$field)),)*
                    _ => None,
                }
            }
        }

        impl $crate::JsonWrite for $ty {
            fn write_json(&self, state: &mut $crate::WriterState<'_>) -> $crate::Result<bool> {
                $crate::write_object(self, state)
            }
        }
    };
}

/// Implements [`JsonEnum`](crate::JsonEnum) and [`JsonWrite`](crate::JsonWrite)
/// for a fieldless enum, writing each variant as a quoted name.
///
/// ```rust
/// use chunked_json::{json_enum, to_string};
///
/// enum Level {
///     Low,
///     High,
/// }
///
/// json_enum!(Level { Low => "low", High });
///
/// assert_eq!(to_string(&vec![Level::Low, Level::High]).unwrap(), r#"["low","High"]"#);
/// ```
#[macro_export]
macro_rules! json_enum {
    (@name $variant:ident) => {
        stringify!($variant)
    };

    (@name $variant:ident $rename:literal) => {
        $rename
    };

    ($ty:ident { $($variant:ident $(=> $rename:literal)?),* $(,)? }) => {
        impl $crate::JsonEnum for $ty {
            fn member_name(&self) -> &str {
                match self {
                    $($ty::$variant => $crate::json_enum!(@name $variant $($rename)?)),*
                }
            }
        }

        impl $crate::JsonWrite for $ty {
            fn write_json(&self, state: &mut $crate::WriterState<'_>) -> $crate::Result<bool> {
                $crate::write_enum(self, state)
            }
        }
    };
}
