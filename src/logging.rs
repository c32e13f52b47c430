// Logs go to the client through `window/logMessage`; `$self` must expose `client`.
macro_rules! lsp_log {
    ($self:expr, $level:ident, $($arg:tt)*) => {
        $self
            .client
            .log_message(lsp_types::MessageType::$level, format!($($arg)*))
            .await
    };
}

macro_rules! info {
    ($self:expr, $($arg:tt)*) => {
        lsp_log!($self, INFO, $($arg)*)
    };
}

macro_rules! error {
    ($self:expr, $($arg:tt)*) => {
        lsp_log!($self, ERROR, $($arg)*)
    };
}

macro_rules! warn {
    ($self:expr, $($arg:tt)*) => {
        lsp_log!($self, WARNING, $($arg)*)
    };
}

// Hover misses are frequent; LOG keeps them out of the default output view.
macro_rules! debug {
    ($self:expr, $($arg:tt)*) => {
        lsp_log!($self, LOG, $($arg)*)
    };
}
