pub mod db_authinfo;
pub mod db_computer;
pub mod db_log;
pub mod db_setting;
pub mod db_user;
pub mod db_workflow;
