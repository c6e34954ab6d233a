use proptest::prelude::*;
use semtab_dataset::{get_friendly_fs_id, slugify};

proptest! {
    #[test]
    fn slug_is_ascii_and_trimmed(text in "\\PC{0,40}", lowercase in any::<bool>()) {
        let slug = slugify(&text, lowercase);
        prop_assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
        if lowercase {
            prop_assert_eq!(slug.to_lowercase(), slug.clone());
        }
    }

    #[test]
    fn plain_ids_map_to_file_names(id in "[A-Za-z0-9 ,./'-]{1,30}") {
        let fs_id = get_friendly_fs_id(&id).unwrap();
        prop_assert!(fs_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        prop_assert_eq!(get_friendly_fs_id(&id).unwrap(), fs_id);
    }

    #[test]
    fn dbpedia_ids_end_with_hash(name in "[A-Za-z_]{1,20}") {
        let fs_id = get_friendly_fs_id(&format!("http://dbpedia.org/resource/{name}")).unwrap();
        let (_, hash) = fs_id.rsplit_once('_').unwrap();
        prop_assert_eq!(hash.len(), 32);
        prop_assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
