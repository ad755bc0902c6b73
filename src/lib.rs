pub mod definitions;
pub mod io;
pub mod keyboard;
pub mod parse;
pub mod simulators;

pub use parse::assembly::{translate, AssemblyError, AssemblyErrors};
pub use simulators::cpu::{Cpu, CpuResult, Flags, RuntimeError};

#[cfg(target_arch = "wasm32")]
mod app {
    use crate::io::KeyQueue;
    use crate::keyboard;
    use crate::parse::assembly::{translate, AssemblyErrors};
    use crate::simulators::cpu::{Cpu, RuntimeError};

    use wasm_bindgen::prelude::*;

    impl From<RuntimeError> for JsValue {
        fn from(error: RuntimeError) -> Self {
            JsValue::from(error.to_string())
        }
    }

    impl From<AssemblyErrors> for JsValue {
        fn from(errors: AssemblyErrors) -> Self {
            JsValue::from(errors.to_string())
        }
    }

    type AppResult = Result<(), JsValue>;

    /// Browser-hosted emulator. The page's scheduler decides how many steps
    /// to run per tick; key events and output bytes pass through here.
    #[wasm_bindgen]
    pub struct App {
        cpu: Cpu<KeyQueue, Vec<u8>>,
    }

    impl Default for App {
        fn default() -> Self {
            Self::new()
        }
    }

    #[wasm_bindgen]
    impl App {
        pub fn new() -> Self {
            #[cfg(feature = "console_error_panic_hook")]
            console_error_panic_hook::set_once();

            Self {
                cpu: Cpu::new(KeyQueue::new(), Vec::new()),
            }
        }

        /// Assemble `source` and load the program at address 0.
        pub fn load_source(&mut self, source: &str) -> AppResult {
            let program = translate(source)?;
            self.cpu.load(&program)?;
            Ok(())
        }

        pub fn step(&mut self) -> AppResult {
            self.cpu.step()?;
            Ok(())
        }

        pub fn step_times(&mut self, times: u32) -> AppResult {
            for _ in 0..times {
                if self.cpu.halted() {
                    break;
                }
                self.cpu.step()?;
            }
            Ok(())
        }

        /// Queue a key event; `key` is the browser's key name.
        pub fn set_input_key(&mut self, key: &str) {
            if let Some(code) = keyboard::get_key_code(key) {
                self.cpu.reader_mut().push_key(code);
            }
        }

        /// Bytes the program has written since the last call, as lossy UTF-8.
        pub fn take_output(&mut self) -> String {
            let bytes = std::mem::take(self.cpu.writer_mut());
            String::from_utf8_lossy(&bytes).into_owned()
        }

        pub fn halted(&self) -> bool {
            self.cpu.halted()
        }

        pub fn set_clock_rate(&mut self, hz: u64) {
            self.cpu.set_clock_rate(hz);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use app::App;
