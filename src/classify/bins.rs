use crate::models::BinCategory;

/// Detector labels and the bin each belongs in.
pub const BIN_TABLE: &[(&str, BinCategory)] = &[
    // Dry, recyclable
    ("bottle", BinCategory::Recycle),
    ("can", BinCategory::Recycle),
    ("cup", BinCategory::Recycle),
    ("wine glass", BinCategory::Recycle),
    ("vase", BinCategory::Recycle),
    ("book", BinCategory::Recycle),
    ("paper", BinCategory::Recycle),
    // Wet
    ("banana", BinCategory::Organic),
    ("apple", BinCategory::Organic),
    ("orange", BinCategory::Organic),
    ("broccoli", BinCategory::Organic),
    ("carrot", BinCategory::Organic),
    ("hot dog", BinCategory::Organic),
    ("pizza", BinCategory::Organic),
    ("donut", BinCategory::Organic),
    ("cake", BinCategory::Organic),
    ("sandwich", BinCategory::Organic),
    ("food", BinCategory::Organic),
    ("potted plant", BinCategory::Organic),
    // Dry, not recyclable
    ("plastic bag", BinCategory::Landfill),
    ("handbag", BinCategory::Landfill),
    ("backpack", BinCategory::Landfill),
    ("suitcase", BinCategory::Landfill),
    ("umbrella", BinCategory::Landfill),
    ("tie", BinCategory::Landfill),
    // E-waste and sharps
    ("cell phone", BinCategory::Hazardous),
    ("laptop", BinCategory::Hazardous),
    ("mouse", BinCategory::Hazardous),
    ("keyboard", BinCategory::Hazardous),
    ("remote", BinCategory::Hazardous),
    ("microwave", BinCategory::Hazardous),
    ("oven", BinCategory::Hazardous),
    ("toaster", BinCategory::Hazardous),
    ("tv", BinCategory::Hazardous),
    ("refrigerator", BinCategory::Hazardous),
    ("scissors", BinCategory::Hazardous),
    ("knife", BinCategory::Hazardous),
];

/// Wet labels that spoil a dry bin.
pub const CONTAMINATION_LABELS: &[&str] = &[
    "banana",
    "apple",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "sandwich",
    "food",
    "potted plant",
];

/// Case-insensitive exact lookup. Unlisted labels go to `Landfill`.
pub fn classify(label: &str) -> BinCategory {
    let label = label.trim();
    BIN_TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(label))
        .map(|(_, bin)| *bin)
        .unwrap_or(BinCategory::Landfill)
}

pub fn is_contaminating(label: &str) -> bool {
    let label = label.trim();
    CONTAMINATION_LABELS
        .iter()
        .any(|name| name.eq_ignore_ascii_case(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_entry_classifies_as_listed() {
        for (label, bin) in BIN_TABLE {
            assert_eq!(classify(label), *bin, "label {label}");
            assert_eq!(classify(&label.to_uppercase()), *bin, "label {label}");
        }
    }

    #[test]
    fn test_unlisted_labels_default_to_landfill() {
        assert_eq!(classify("giraffe"), BinCategory::Landfill);
        assert_eq!(classify(""), BinCategory::Landfill);
        // exact match only, no substring hits
        assert_eq!(classify("plastic bottle"), BinCategory::Landfill);
    }

    #[test]
    fn test_contamination_set() {
        assert!(is_contaminating("Banana"));
        assert!(is_contaminating("POTTED PLANT"));
        assert!(!is_contaminating("bottle"));
        assert!(!is_contaminating("banana peel"));
        for label in CONTAMINATION_LABELS {
            assert_eq!(classify(label), BinCategory::Organic);
        }
    }
}
