mod list;
mod map;
mod misuse;
mod union;
