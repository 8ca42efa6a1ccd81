mod csv_export;
mod payloads;
mod session_store;
