pub mod rehearse_cmd;
