use crate::models::Coordinates;

/// Build the user prompt for the nearest-kebab lookup.
///
/// The labeled lines must stay in sync with the field patterns in
/// [`super::extractor`].
pub fn build_kebab_prompt(coords: &Coordinates) -> String {
    format!(
        r#"Find the absolute SINGLE best rated kebab or shawarma place near me (Lat: {}, Lng: {}).
I need the following details in this exact format:
Name: [Name of Place]
Address: [Street Address, City]
Distance: [Approximate distance in km from my location, just the number and unit]
Reason: [Short 1 sentence spicy description]

If you find multiple good ones, just pick the #1 best one."#,
        coords.latitude, coords.longitude
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_coordinates_and_labels() {
        let prompt = build_kebab_prompt(&Coordinates::new(41.0082, 28.9784));

        assert!(prompt.contains("Lat: 41.0082, Lng: 28.9784"));
        for label in ["Name:", "Address:", "Distance:", "Reason:"] {
            assert!(
                prompt.lines().any(|line| line.starts_with(label)),
                "prompt should ask for {}",
                label
            );
        }
    }
}
