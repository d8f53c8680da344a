//! User-facing texts shown on the progress surface and in notices.

pub const INSTALL_FIRST_PLUGIN_PROMPT: &str = "Installing the first plugin on your site can take up to 1 minute.\nDuring this time you won’t be able to make changes to your site.";
pub const ALERT_CANCEL: &str = "Cancel";
pub const ALERT_INSTALL: &str = "Install";

// Eligibility rejections
pub const ELIGIBILITY_UNVERIFIED_EMAIL: &str = "Plugin feature requires a verified email address.";
pub const ELIGIBILITY_EXCESSIVE_USAGE: &str =
    "Plugin cannot be installed due to disk space limitations.";
pub const ELIGIBILITY_NO_BUSINESS_PLAN: &str = "Plugin feature requires a business plan.";
pub const ELIGIBILITY_VIP_SITE: &str = "Plugin cannot be installed on VIP sites.";
pub const ELIGIBILITY_NOT_ADMIN: &str = "Plugin feature requires admin privileges.";
pub const ELIGIBILITY_NOT_DOMAIN_OWNER: &str =
    "Plugin feature requires primary domain subscription to be associated with this user.";
pub const ELIGIBILITY_NO_CUSTOM_DOMAIN: &str = "Plugin feature requires a custom domain.";
pub const ELIGIBILITY_GREYLISTED: &str = "Plugin feature requires the site to be in good standing.";
pub const ELIGIBILITY_PRIVATE_SITE: &str = "Plugin feature requires the site to be public.";
pub const ELIGIBILITY_GENERIC: &str = "Plugin feature is not available for this site.";

pub const INSTALL_ALMOST_DONE: &str = "We're doing the final setup — almost done…";

pub fn progress_title(plugin_name: &str) -> String {
    format!("Installing {}…", plugin_name)
}

pub fn generic_error(plugin_name: &str) -> String {
    format!("Error installing {}.", plugin_name)
}

pub fn success(plugin_name: &str) -> String {
    format!("Successfully installed {}.", plugin_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_name_formatting() {
        assert_eq!(progress_title("Akismet"), "Installing Akismet…");
        assert_eq!(generic_error("Akismet"), "Error installing Akismet.");
        assert_eq!(success("Akismet"), "Successfully installed Akismet.");
    }
}
