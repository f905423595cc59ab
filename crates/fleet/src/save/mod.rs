use std::{path::Path, fs, io};
use enum_dispatch::enum_dispatch;
use serde::{Serialize, de::DeserializeOwned};

// ----------------------------------------------
// SaveState
// ----------------------------------------------

pub type SaveResult = Result<(), String>;

// Serialization backend for durable state and config files.
#[enum_dispatch(SaveStateImpl)]
pub trait SaveState {
    fn save<T>(&mut self, instance: &T) -> SaveResult
        where T: Serialize;

    fn load_new_instance<T>(&self) -> Result<T, String>
        where T: DeserializeOwned;

    fn read_file<P>(&mut self, path: P) -> io::Result<()>
        where P: AsRef<Path>;

    fn write_file<P>(&self, path: P) -> io::Result<()>
        where P: AsRef<Path>;
}

#[enum_dispatch]
pub enum SaveStateImpl {
    Json(backend::JsonSaveState),
}

// ----------------------------------------------
// SaveState Implementations
// ----------------------------------------------

pub mod backend {
use super::*;

// ----------------------------------------------
// JsonSaveState
// ----------------------------------------------

pub struct JsonSaveState {
    pretty: bool,
    buffer: String,
}

impl JsonSaveState {
    pub fn new(pretty_print: bool) -> Self {
        Self {
            pretty: pretty_print,
            buffer: String::new(),
        }
    }
}

impl SaveState for JsonSaveState {
    fn save<T>(&mut self, instance: &T) -> SaveResult
        where T: Serialize
    {
        let result = {
            if self.pretty {
                serde_json::to_string_pretty(instance)
            } else {
                serde_json::to_string(instance)
            }
        };

        self.buffer = result.map_err(|err| err.to_string())?;
        Ok(())
    }

    fn load_new_instance<T>(&self) -> Result<T, String>
        where T: DeserializeOwned
    {
        if self.buffer.is_empty() {
            return Err("JsonSaveState has no state to load!".into());
        }

        serde_json::from_str::<T>(&self.buffer).map_err(|err| err.to_string())
    }

    fn read_file<P>(&mut self, path: P) -> io::Result<()>
        where P: AsRef<Path>
    {
        self.buffer = fs::read_to_string(path)?;
        Ok(())
    }

    fn write_file<P>(&self, path: P) -> io::Result<()>
        where P: AsRef<Path>
    {
        fs::write(path, &self.buffer)
    }
}

#[inline]
pub fn new_json_save_state(pretty_print: bool) -> SaveStateImpl {
    SaveStateImpl::from(JsonSaveState::new(pretty_print))
}
}
