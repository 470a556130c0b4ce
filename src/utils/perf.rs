/// Times a block (sync or `.await`ing) and logs it when it runs past the
/// threshold. Compiles to the bare block unless `DF.log_performance` is on.
#[macro_export]
macro_rules! trace_time {
    // $threshold_ms: 500 for 0.5s, 2000 for 2s, etc.
    ($name:expr, $threshold_ms:expr, $block:block) => {{
        if $crate::config::DF.log_performance {
            let start = $crate::utils::AppInstant::now();
            let result = $block;
            let millis = start.elapsed().as_millis();
            if millis > $threshold_ms {
                log::warn!(
                    "🐢 SLOW: '{}' took {}ms (threshold: {}ms)",
                    $name,
                    millis,
                    $threshold_ms
                );
            }
            result
        } else {
            $block
        }
    }};
}
