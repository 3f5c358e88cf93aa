/// Replace the password of a URL-style connection string with `***`.
///
/// Strings without credentials (e.g. `sqlite::memory:` or a dump path) are
/// returned unchanged.
pub fn redact_connection_string(conn: &str) -> String {
    let Some(scheme_end) = conn.find("://") else {
        return conn.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &conn[authority_start..];

    // The password may hold `/`, `?` or `@`, so the host starts after the
    // last `@` that precedes the path.
    let Some(first_at) = rest.find('@') else {
        return conn.to_string();
    };
    let host_end = rest[first_at..]
        .find(['/', '?'])
        .map_or(rest.len(), |idx| first_at + idx);
    let at_idx = rest[..host_end].rfind('@').unwrap_or(first_at);
    let Some(colon_idx) = rest[..at_idx].find(':') else {
        return conn.to_string();
    };

    let password_start = authority_start + colon_idx + 1;
    let password_end = authority_start + at_idx;
    let mut redacted = conn.to_string();
    redacted.replace_range(password_start..password_end, "***");
    redacted
}
