use std::collections::HashMap;

use fedexec::value::Value;

/// Map positional arguments to named bind variables `v1`, `v2`, ...
pub fn make_bind_vars(args: &[Value]) -> HashMap<String, Value> {
    args.iter()
        .enumerate()
        .map(|(i, v)| (format!("v{}", i + 1), v.clone()))
        .collect()
}
