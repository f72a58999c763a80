mod mock;

pub use mock::*;

use log::LevelFilter;
use std::env;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}

/// Declares a unit struct implementing `Fields` and `Record` from a field list.
///
/// Meant for compiler tests: the struct has no data, `values` is empty.
///
/// ```ignore
/// record!(User, "user", [("id", i64, "ai"), ("name", String, "len(50)")], meta = "name(users)");
/// ```
#[macro_export]
macro_rules! record {
    (
        $name:ident,
        $table:expr,
        [$(($field:expr, $ty:ty, $tag:expr)),* $(,)?]
        $(, meta = $meta:expr)?
        $(, view = $view:expr)?
        $(,)?
    ) => {
        struct $name;
        impl ::skiff_core::Fields for $name {
            fn fields() -> Vec<::skiff_core::FieldDef> {
                vec![$(::skiff_core::FieldDef::column::<$ty>($field, $tag)),*]
            }
            fn values(&self) -> Vec<::skiff_core::Value> {
                Vec::new()
            }
            fn from_row(_: &::skiff_core::RowLabeled) -> ::skiff_core::Result<Self> {
                Ok($name)
            }
        }
        impl ::skiff_core::Record for $name {
            fn table_name() -> ::std::borrow::Cow<'static, str> {
                $table.into()
            }
            $(fn meta() -> Option<&'static str> {
                Some($meta)
            })?
            $(fn view() -> Option<&'static str> {
                Some($view)
            })?
        }
    };
}
