pub mod clock;
pub mod csv_export;
pub mod qr;
pub mod report;
pub mod staff_id;
pub mod staff_id_cache;
pub mod staff_id_filter;
