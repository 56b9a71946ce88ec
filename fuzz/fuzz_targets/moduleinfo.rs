#![no_main]

use libfuzzer_sys::fuzz_target;
use dotpdb::metadata::module::ModuleInfo;

fuzz_target!(|data: &[u8]| {
    let _ = ModuleInfo::from_mem(data.to_vec());
});
