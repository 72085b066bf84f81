use std::collections::HashMap;

use chrono::Utc;
use serde_json::{Value, json};

use super::Row;

pub(super) const TABLES: &[&str] = &[
    "plants",
    "categories",
    "orders",
    "plant_requests",
    "care_guides",
    "user_preferences",
    "audit_logs",
];

const UNSPLASH: &str = "https://images.unsplash.com";
const IMAGE_PARAMS: &str = "ixlib=rb-4.0.3&auto=format&fit=crop&w=1000&q=80";

pub(super) fn tables() -> HashMap<String, Vec<Row>> {
    let mut tables: HashMap<String, Vec<Row>> = TABLES
        .iter()
        .map(|name| (name.to_string(), Vec::new()))
        .collect();
    tables.insert("plants".to_string(), plants());
    tables.insert("categories".to_string(), categories());
    tables.insert("care_guides".to_string(), care_guides());
    tables
}

#[allow(clippy::too_many_arguments)]
fn plant(
    id: &str,
    name: &str,
    name_ne: &str,
    price: f64,
    photo: &str,
    category: &str,
    rating: f64,
    description: &str,
    description_ne: &str,
    stock: i64,
) -> Value {
    let now = Utc::now().to_rfc3339();
    json!({
        "id": id,
        "name": name,
        "name_ne": name_ne,
        "price": price,
        "image": format!("{UNSPLASH}/{photo}?{IMAGE_PARAMS}"),
        "category": category,
        "rating": rating,
        "description": description,
        "description_ne": description_ne,
        "stock": stock,
        "created_at": now,
        "updated_at": now,
    })
}

fn plants() -> Vec<Row> {
    vec![
        plant(
            "1",
            "Snake Plant",
            "सर्प बिरुवा",
            25.99,
            "photo-1593691509543-c55fb32d8de5",
            "indoor",
            4.8,
            "Low maintenance, air-purifying plant perfect for beginners",
            "कम हेरचाह चाहिने, हावा सफा गर्ने बिरुवा",
            25,
        ),
        plant(
            "2",
            "Monstera Deliciosa",
            "मोन्स्टेरा",
            35.99,
            "photo-1506905925346-21bda4d32df4",
            "indoor",
            4.9,
            "Large, distinctive leaves that add tropical vibes to any space",
            "ठूला, विशिष्ट पातहरू जसले कुनै पनि ठाउँमा उष्णकटिबंधीय वातावरण थप्छ",
            15,
        ),
        plant(
            "3",
            "Peace Lily",
            "शान्ति लिली",
            22.99,
            "photo-1416879595882-3373a0480b5b",
            "flowering",
            4.7,
            "Elegant white flowers and glossy green leaves",
            "सुन्दर सेता फूल र चम्किलो हरियो पातहरू",
            20,
        ),
        plant(
            "4",
            "Fiddle Leaf Fig",
            "फिडल पात",
            45.99,
            "photo-1586063271824-7a78e1950afc",
            "indoor",
            4.6,
            "Statement plant with large, violin-shaped leaves",
            "ठूला, भायोलिन आकारका पातहरू भएको विशेष बिरुवा",
            8,
        ),
        plant(
            "5",
            "Succulent Mix",
            "रसिलो मिश्रण",
            18.99,
            "photo-1459411621453-7b03977f4bfc",
            "succulent",
            4.5,
            "Collection of drought-resistant succulent plants",
            "खडेरी प्रतिरोधी रसिलो बिरुवाहरूको संग्रह",
            30,
        ),
        plant(
            "6",
            "Pothos",
            "पोथोस",
            19.99,
            "photo-1572688484435-fc4c3d5f98e9",
            "indoor",
            4.8,
            "Fast-growing vine perfect for hanging baskets",
            "झुण्ड्याउने टोकरीका लागि उपयुक्त छिटो बढ्ने बेल",
            22,
        ),
    ]
}

fn categories() -> Vec<Row> {
    vec![
        json!({ "id": "all", "name_en": "All Plants", "name_ne": "सबै बिरुवा" }),
        json!({ "id": "indoor", "name_en": "Indoor", "name_ne": "घर भित्र" }),
        json!({ "id": "flowering", "name_en": "Flowering", "name_ne": "फूल फुल्ने" }),
        json!({ "id": "succulent", "name_en": "Succulents", "name_ne": "रसिलो" }),
    ]
}

fn care_guides() -> Vec<Row> {
    vec![
        json!({
            "id": "1",
            "title": "Watering",
            "title_ne": "पानी दिने",
            "description": "Understand your plant's water needs.",
            "description_ne": "तपाईंको बिरुवाको पानीको आवश्यकता बुझ्नुहोस्।",
            "icon": "droplets",
            "tips": [
                "Check soil moisture before watering",
                "Water thoroughly but less frequently",
                "Use room temperature water",
            ],
            "tips_ne": [
                "पानी दिनु अघि माटोको चिस्यान जाँच्नुहोस्",
                "राम्रोसँग तर कम पटक पानी दिनुहोस्",
                "कोठाको तापक्रमको पानी प्रयोग गर्नुहोस्",
            ],
        }),
        json!({
            "id": "2",
            "title": "Sunlight",
            "title_ne": "घामको प्रकाश",
            "description": "Provide the right amount of light for healthy growth.",
            "description_ne": "स्वस्थ वृद्धिको लागि सही मात्रामा प्रकाश प्रदान गर्नुहोस्।",
            "icon": "sun",
            "tips": [
                "Most plants need bright, indirect light",
                "Rotate plants weekly for even growth",
                "Watch for signs of too much or too little light",
            ],
            "tips_ne": [
                "धेरैजसो बिरुवाहरूलाई उज्यालो, अप्रत्यक्ष प्रकाश चाहिन्छ",
                "साप्ताहिक बिरुवाहरू घुमाउनुहोस्",
                "धेरै वा कम प्रकाशका संकेतहरूको लागि हेरचाह गर्नुहोस्",
            ],
        }),
    ]
}
