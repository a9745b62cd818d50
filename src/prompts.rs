//! Fixed prompt text for the sketch-to-prototype calls

/// Libraries the generated App.js is allowed to import. The sandbox panel
/// is expected to resolve this same set.
pub const SANDBOX_DEPENDENCIES: [&str; 9] = [
    "react",
    "react-dom",
    "axios",
    "react-router-dom",
    "redux",
    "react-redux",
    "redux-thunk",
    "styled-components",
    "react-icons",
];

/// System prompt for the initial generation call
pub fn generation_system_prompt() -> String {
    format!(
        "You are an expert react developer. Create a full fledged prototype using react for the sketch provided. It is your job to generate an App.js page and use inline tailwind styling to replicate the exact image as fully functional as possible (useState / useEffect) for a web application. You may leverage the imports: {}. But remember to add them as imports in the App.js file. Be helpful by going beyond UI and layout and implement all inferrable functions and use icons. Make multiple components within file and reference in App() if you have to.",
        SANDBOX_DEPENDENCIES.join(", ")
    )
}

/// System prompt for the revision call
pub const REVISION_SYSTEM_PROMPT: &str = "You are an expert react developer. Create a full fledged prototype using react for the sketch provided. It is your job to generate an App.js page and use inline tailwind styling to replicate the exact image as fully functional as possible (useState / useEffect) for a web application. Go beyond UI by implementing inferrable functions or icons, helping the user take this several steps forward.";

/// Closing directive restricting the response to code-only text
pub const CODE_ONLY_DIRECTIVE: &str = "Please return only the code for App.js! If you have anything outside of code to say, place as a comment at the beginning using //. Your response will be used directly in code for an App.js file.";

/// Closing directive for the revision call, carrying the user's edit text
pub fn edit_directive(edits: &str) -> String {
    format!(
        "Edit the following App.js. I want to: {}. Your response will be used directly in code for this App.js file.",
        edits
    )
}
