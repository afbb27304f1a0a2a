pub mod chat_adjustment_service;
pub mod gemini_client;
pub mod itinerary_generation_service;
pub mod itinerary_service;
pub mod prompt_builder;
pub mod response_normalizer;
pub mod token_service;
