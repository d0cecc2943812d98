use fedexec::config::ServerConfig;
use fedexec::session::SessionVars;
use fedexec::value::Value;

/// Create session variables holding the defaults a MySQL client expects.
pub fn new_mysql_session_vars(conf: &ServerConfig) -> SessionVars {
    let mut vars = SessionVars::new();
    vars.set("autocommit", 1_i64);
    vars.set("max_allowed_packet", conf.max_allowed_packet);
    vars.set("version", conf.server_version.as_str());
    vars.set("version_comment", "fedsql");
    vars.set("character_set_client", "utf8mb4");
    vars.set("character_set_connection", "utf8mb4");
    vars.set("character_set_results", "utf8mb4");
    vars.set("collation_connection", "utf8mb4_general_ci");
    vars.set("sql_mode", "");
    vars.set("tx_isolation", "REPEATABLE-READ");
    vars.set("time_zone", "SYSTEM");
    vars.set("interactive_timeout", 28800_i64);
    vars.set("wait_timeout", 28800_i64);
    vars.set("sql_select_limit", Value::Null);
    vars
}
