//! Fixed table of third-party module aliases.
//!
//! These libraries ship sub-modules under names that differ from their
//! package id, so the table overrides whatever their manifests declare.

/// Package id and the module paths it also satisfies, in precedence order.
pub const WELL_KNOWN_ALIASES: &[(&str, &[&str])] = &[
    (
        "luasocket",
        &[
            "socket",
            "socket.http",
            "socket.ftp",
            "socket.smtp",
            "socket.url",
            "socket.headers",
            "socket.tp",
            "socket.core",
        ],
    ),
    ("cjson", &["cjson.safe"]),
    ("windows", &["windows.message"]),
    ("ssl", &["ssl.https"]),
    ("mimgui", &["mimgui.imgui", "mimgui.dx9", "mimgui.cdefs"]),
    (
        "socket",
        &[
            "socket.http",
            "socket.ftp",
            "socket.smtp",
            "socket.url",
            "socket.headers",
            "socket.tp",
            "socket.core",
        ],
    ),
    ("mime", &["mime.core"]),
    ("ltn12", &["ltn12"]),
    ("xml", &["xml.core"]),
    ("lub", &["lub"]),
];

/// Returns the well-known aliases of `id`, if the table has an entry.
#[must_use]
pub fn aliases_for(id: &str) -> Option<&'static [&'static str]> {
    WELL_KNOWN_ALIASES
        .iter()
        .find(|(pkg, _)| *pkg == id)
        .map(|(_, aliases)| *aliases)
}

/// Returns the first package claiming `alias` in the table.
#[must_use]
pub fn resolve_alias(alias: &str) -> Option<&'static str> {
    WELL_KNOWN_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&alias))
        .map(|(pkg, _)| *pkg)
}
