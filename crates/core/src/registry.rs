use crate::models::Intent;

const SHELTER_GUIDANCE: &str = "The nearest shelter can be found using the map feature. \
     Click on the \"Map\" tab and look for shelter icons.";

const MEDICAL_GUIDANCE: &str = "For medical emergencies, use the panic button or call \
     emergency services. Medical teams will be dispatched to your location.";

const REPORT_GUIDANCE: &str = "To report a disaster, use the \"Report Incident\" feature \
     or press the panic button. Share your location and any photos if possible.";

const FLOOD_GUIDANCE: &str = "In case of flood: 1) Move to higher ground 2) Avoid walking \
     through water 3) Follow evacuation orders 4) Stay tuned to alerts";

const EARTHQUAKE_GUIDANCE: &str = "During an earthquake: 1) Drop, Cover, and Hold On \
     2) Stay away from windows 3) If inside, stay inside 4) If outside, move to an open area";

pub const FALLBACK_GUIDANCE: &str = "I understand you need help. Please use the panic \
     button for immediate assistance or provide more details about your situation.";

pub fn guidance_for(intent: Intent) -> &'static str {
    match intent {
        Intent::Shelter => SHELTER_GUIDANCE,
        Intent::Medical => MEDICAL_GUIDANCE,
        Intent::Report => REPORT_GUIDANCE,
        Intent::FloodSafety => FLOOD_GUIDANCE,
        Intent::EarthquakeSafety => EARTHQUAKE_GUIDANCE,
        Intent::Fallback => FALLBACK_GUIDANCE,
    }
}

pub fn guidance_catalog() -> Vec<(Intent, &'static str)> {
    Intent::ALL
        .into_iter()
        .map(|intent| (intent, guidance_for(intent)))
        .collect()
}
