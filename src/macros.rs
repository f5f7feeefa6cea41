// Logging hooks. Only metadata (element type and count) is ever passed in.

macro_rules! trace_event {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        {
            ::log::trace!(target: "flex_secret", $($arg)+);
        }
    };
}

macro_rules! warn_event {
    ($($arg:tt)+) => {
        #[cfg(feature = "log")]
        {
            ::log::warn!(target: "flex_secret", $($arg)+);
        }
    };
}
