use chrono::{TimeZone, Utc};
use dataverse_source::DataverseOpts;
use mailchimp_sink::MailchimpOpts;
use sync_core::RunConfig;

#[test]
fn test_dataverse_opts_creation() {
    let opts = DataverseOpts {
        dataverse_tenant_id: "00000000-0000-0000-0000-00000000000a".to_string(),
        dataverse_client_id: "00000000-0000-0000-0000-00000000000b".to_string(),
        dataverse_client_secret: "s3cret".to_string(),
        dataverse_resource: "https://org.crm.dynamics.com".to_string(),
    };

    assert_eq!(opts.dataverse_tenant_id, "00000000-0000-0000-0000-00000000000a");
    assert_eq!(opts.dataverse_client_id, "00000000-0000-0000-0000-00000000000b");
    assert_eq!(opts.dataverse_client_secret, "s3cret");
    assert_eq!(opts.dataverse_resource, "https://org.crm.dynamics.com");
}

#[test]
fn test_mailchimp_opts_creation() {
    let opts = MailchimpOpts {
        mailchimp_api_key: "abc123-us21".to_string(),
        mailchimp_audience_id: "aud-1".to_string(),
        mc_rate_limit: 10,
    };

    assert_eq!(opts.mailchimp_api_key, "abc123-us21");
    assert_eq!(opts.mailchimp_audience_id, "aud-1");
    assert_eq!(opts.mc_rate_limit, 10);
}

#[test]
fn test_run_config_creation() {
    let config = RunConfig {
        since: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        limit: Some(500),
        allow_partial: false,
        dry_run: false,
    };

    assert_eq!(config.since, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    assert_eq!(config.limit, Some(500));
    assert!(!config.allow_partial);
    assert!(!config.dry_run);
}

#[test]
fn test_dry_run_flag() {
    let config = RunConfig {
        since: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        limit: None,
        allow_partial: true,
        dry_run: true,
    };

    assert!(config.dry_run);
    assert!(config.allow_partial);
}
