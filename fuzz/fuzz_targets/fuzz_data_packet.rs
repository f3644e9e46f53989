// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use sacn::protocol::{encode, DataPacket};

fuzz_target!(|data: &[u8]| {
    let Ok(packet) = DataPacket::decode(data) else {
        return;
    };

    // Source names may be lossily decoded; everything else must survive
    let again = DataPacket::decode(&encode(&packet)).expect("re-encoded packet decodes");
    assert_eq!(again.cid(), packet.cid());
    assert_eq!(again.universe(), packet.universe());
    assert_eq!(again.priority(), packet.priority());
    assert_eq!(again.sequence(), packet.sequence());
    assert_eq!(again.data(), packet.data());
});
