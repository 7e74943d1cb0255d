pub mod local_date;
