/// Runs `f` with the given variables set (or, for `None`, removed), then
/// restores the previous environment.
fn scoped_env<F>(vars: Vec<(&str, Option<&str>)>, f: F)
where
    F: FnOnce(),
{
    let saved: Vec<_> = vars
        .iter()
        .map(|(k, _)| (*k, std::env::var(k).ok()))
        .collect();

    for (key, value) in &vars {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }

    f();

    for (key, old_value) in saved {
        match old_value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
}

pub fn with_env<F>(vars: Vec<(&str, &str)>, f: F)
where
    F: FnOnce(),
{
    scoped_env(vars.into_iter().map(|(k, v)| (k, Some(v))).collect(), f);
}

pub fn without_env<F>(vars: &[&str], f: F)
where
    F: FnOnce(),
{
    scoped_env(vars.iter().map(|k| (*k, None)).collect(), f);
}
