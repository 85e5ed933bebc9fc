use orc_contracts::{Match, MatchAttribute};
use orc_model::{ContentKind, SampleSpec};

/// Builds the per-sample archive-internal file name:
/// `<volumeserial:hex>_<parent_frn:hex>_<frn:hex>_<instance:hex>_<filename>[_<datastream>]_<snapshot-guid>.<content-kind>`,
/// with whitespace, `:` and `#` replaced by `_`. This is the *newer*,
/// last-name variant required for new implementations — the older
/// bitwise-encoded variant is test data for the source system, not
/// required output here.
pub fn archive_name(
    spec: &SampleSpec,
    event: &Match,
    attribute: &MatchAttribute,
    content_kind: ContentKind,
) -> String {
    let filename = event.preferred_name().unwrap_or("unnamed");
    let mut base = format!(
        "{:X}_{:X}_{:X}_{:X}_{}",
        event.volume_serial as u64,
        event.parent_file_record_number,
        event.file_record_number,
        attribute.instance_id,
        filename
    );

    if !attribute.stream_name.is_empty() {
        base.push('_');
        base.push_str(&attribute.stream_name);
    }

    base.push('_');
    base.push_str(&event.snapshot_id.to_string());
    base.push('.');
    base.push_str(&content_kind.to_string());

    let sanitized: String = base
        .chars()
        .map(|c| if c.is_whitespace() || c == ':' || c == '#' { '_' } else { c })
        .collect();

    if spec.name_prefix.is_empty() {
        sanitized
    } else {
        format!("{}\\{}", spec.name_prefix, sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_model::ContentSpec;
    use uuid::Uuid;

    fn sample_match() -> Match {
        Match {
            term_name: "cfg".into(),
            file_record_number: 0x10,
            parent_file_record_number: 0x5,
            volume_serial: 0x42,
            snapshot_id: Uuid::nil(),
            full_path: "C:\\boot.ini".into(),
            names: vec!["boot.ini".into()],
            attributes: Vec::new(),
            record_in_use: true,
            standard_information_times: Default::default(),
            file_name_times: Default::default(),
        }
    }

    #[test]
    fn template_omits_empty_datastream_segment() {
        let spec = SampleSpec::new("", ContentSpec::default());
        let event = sample_match();
        let attr = MatchAttribute {
            attribute_index: 0,
            instance_id: 2,
            data_size: 10,
            stream_name: String::new(),
        };
        let name = archive_name(&spec, &event, &attr, ContentKind::Data);
        assert_eq!(name, "42_5_10_2_boot.ini_00000000-0000-0000-0000-000000000000.data");
    }

    #[test]
    fn non_empty_spec_name_prefixes_the_path() {
        let spec = SampleSpec::new("ConfigFiles", ContentSpec::default());
        let event = sample_match();
        let attr = MatchAttribute {
            attribute_index: 0,
            instance_id: 0,
            data_size: 10,
            stream_name: String::new(),
        };
        let name = archive_name(&spec, &event, &attr, ContentKind::Data);
        assert!(name.starts_with("ConfigFiles\\"));
    }

    #[test]
    fn last_alias_wins_over_earlier_names() {
        let spec = SampleSpec::new("", ContentSpec::default());
        let mut event = sample_match();
        event.names = vec!["first.ini".into(), "second.ini".into()];
        let attr = MatchAttribute {
            attribute_index: 0,
            instance_id: 0,
            data_size: 10,
            stream_name: String::new(),
        };
        let name = archive_name(&spec, &event, &attr, ContentKind::Data);
        assert!(name.contains("second.ini"));
        assert!(!name.contains("first.ini"));
    }
}
