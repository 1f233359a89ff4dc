#![no_main]

use aop_wasm_module::{LinearMemory, ModuleConfig, ModuleInstance, VecMemory};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > 64 * 1024 {
        &data[..64 * 1024]
    } else {
        data
    };

    // First byte picks the split between message and environment.
    let (msg, env) = match data.split_first() {
        Some((&k, rest)) => rest.split_at((k as usize).min(rest.len())),
        None => (data, data),
    };

    let Ok(mut inst) = ModuleInstance::new(ModuleConfig::default(), VecMemory::new()) else {
        return;
    };
    let (mp, ml) = inst.place(msg).expect("place message");
    let (ep, el) = inst.place(env).expect("place environment");
    let ptr = inst.handle(mp, ml, ep, el).expect("handle");

    let out = inst
        .memory()
        .read(ptr, inst.result_length())
        .expect("result in bounds");
    let v: serde_json::Value = serde_json::from_slice(out).expect("envelope is json");
    assert_eq!(v.as_object().map(|o| o.len()), Some(2));
});
