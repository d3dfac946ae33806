/// Syncs the document fullscreen state with the session flag.
pub(super) fn fullscreen_script(enabled: bool) -> String {
    format!(
        r"(function() {{
            const wanted = {enabled};
            const active = !!document.fullscreenElement;
            if (wanted && !active && document.documentElement.requestFullscreen) {{
                document.documentElement.requestFullscreen().catch(() => {{}});
            }} else if (!wanted && active && document.exitFullscreen) {{
                document.exitFullscreen().catch(() => {{}});
            }}
        }})();"
    )
}

pub(super) fn focus_script(target: &str) -> String {
    format!("document.getElementById({target:?})?.focus();")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullscreen_script_embeds_flag() {
        assert!(fullscreen_script(true).contains("const wanted = true;"));
        assert!(fullscreen_script(false).contains("const wanted = false;"));
    }

    #[test]
    fn focus_script_quotes_target() {
        assert_eq!(
            focus_script("start-email"),
            "document.getElementById(\"start-email\")?.focus();"
        );
    }
}
