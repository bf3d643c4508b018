//! Fuzz target: stored configuration blob
//!
//! Feeds arbitrary bytes to the postcard decoder used for the NVS config
//! blob.  Anything that decodes must either validate or be rejected
//! cleanly, and a validated config must survive a save/load cycle.
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use gasguard::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = postcard::from_bytes::<SystemConfig>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    let bytes = postcard::to_allocvec(&cfg).expect("valid config encodes");
    let back: SystemConfig = postcard::from_bytes(&bytes).expect("own encoding decodes");
    assert!(back.validate().is_ok());
    assert_eq!(back.base_thresholds(), cfg.base_thresholds());
});
