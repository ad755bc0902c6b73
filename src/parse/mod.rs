pub mod assembly;
mod symbols;
