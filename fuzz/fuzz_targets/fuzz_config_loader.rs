#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing plus validation must reject bad input without panicking.
    if let Ok(cfg) = shot_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A validated config must convert into engine settings cleanly
            let _analysis: shot_core::AnalysisCfg = (&cfg).into();
        }
    }
});
