pub const EXTRACT_RFP: &str = "You are a procurement assistant. Extract the following JSON \
structure from the user's request: { title: string, description: string, items: \
Array<{name: string, quantity: number, specs: string}>, budget: number, deliveryDate: string, \
terms: string[] }. Return ONLY a JSON object.";

pub const ANALYZE_PROPOSAL: &str = "Analyze this vendor email proposal. Extract JSON: { price: \
number (total), deliveryTimeline: string, warranty: string, pros: string[], cons: string[] }. \
Return ONLY a JSON object.";

pub const COMPARE_PROPOSALS: &str = "Compare these proposals and recommend a winner with \
reasoning. Data provided is valid JSON.";
