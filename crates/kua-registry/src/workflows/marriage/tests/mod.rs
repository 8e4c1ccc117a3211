mod agenda;
mod common;
mod geocoding;
mod scheduling;
