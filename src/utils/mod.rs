pub mod conf_helper;
