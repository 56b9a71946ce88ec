#![no_main]

use libfuzzer_sys::fuzz_target;
use dotpdb::pdb::PortablePdb;

fuzz_target!(|data: &[u8]| {
    let _ = PortablePdb::parse(data);
});
