/// Tracing target used for lines that report a finished piece of work.
pub const SUCCESS_TARGET: &str = "asnscope::success";

/// Tracing target used for pre-formatted terminal output.
pub const PRINT_TARGET: &str = "asnscope::print";

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__private::tracing::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__private::tracing::info!(target: "asnscope::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__private::tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::__private::tracing::error!($($arg)*)
    };
}
