mod common;
mod compound;
mod rulebook;
