//! Build script for motionlog — RP2040 memory layout

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() {
    let out = &PathBuf::from(env::var_os("OUT_DIR").unwrap());

    let memory_x = "/* Memory layout for RP2040 (Raspberry Pi Pico) */\n\
            MEMORY {\n\
            \x20   BOOT2 : ORIGIN = 0x10000000, LENGTH = 0x100\n\
            \x20   FLASH : ORIGIN = 0x10000100, LENGTH = 2048K - 0x100\n\
            \x20   RAM   : ORIGIN = 0x20000000, LENGTH = 264K\n\
            }\n\
            \n\
            EXTERN(BOOT2_FIRMWARE)\n\
            \n\
            SECTIONS {\n\
            \x20   /* Second-stage bootloader, checksummed by the ROM */\n\
            \x20   .boot2 ORIGIN(BOOT2) :\n\
            \x20   {\n\
            \x20       KEEP(*(.boot2));\n\
            \x20   } > BOOT2\n\
            } INSERT BEFORE .text;\n";

    let mut f = File::create(out.join("memory.x")).unwrap();
    f.write_all(memory_x.as_bytes()).unwrap();

    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=build.rs");
}
