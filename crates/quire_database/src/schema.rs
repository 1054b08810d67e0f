//! Diesel table definitions.

diesel::table! {
    schema_version (id) {
        id -> Integer,
        version -> Integer,
        applied_at -> Text,
    }
}

diesel::table! {
    projects (id) {
        id -> BigInt,
        name -> Text,
        author -> Nullable<Text>,
        theme -> Nullable<Text>,
        style -> Nullable<Text>,
        topic -> Nullable<Text>,
        status -> Text,
        ai_model -> Nullable<Text>,
        settings -> Nullable<Text>,
        created_at -> Text,
        last_modified -> Text,
    }
}

diesel::table! {
    outlines (id) {
        id -> BigInt,
        project_id -> BigInt,
        content -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    chapters (id) {
        id -> BigInt,
        project_id -> BigInt,
        chapter_index -> Integer,
        title -> Nullable<Text>,
        content -> Text,
        status -> Text,
        ai_params -> Nullable<Text>,
        last_modified -> Text,
    }
}

diesel::table! {
    characters (id) {
        id -> BigInt,
        project_id -> BigInt,
        name -> Text,
        description -> Nullable<Text>,
        personality -> Nullable<Text>,
        appearance -> Nullable<Text>,
        background -> Nullable<Text>,
        relationships -> Nullable<Text>,
    }
}

diesel::table! {
    reviews (id) {
        id -> BigInt,
        project_id -> BigInt,
        review_time -> Text,
        review_type -> Text,
        result -> Nullable<Text>,
        issues -> Nullable<Text>,
        suggestions -> Nullable<Text>,
        status -> Text,
    }
}

diesel::joinable!(outlines -> projects (project_id));
diesel::joinable!(chapters -> projects (project_id));
diesel::joinable!(characters -> projects (project_id));
diesel::joinable!(reviews -> projects (project_id));

diesel::allow_tables_to_appear_in_same_query!(
    schema_version,
    projects,
    outlines,
    chapters,
    characters,
    reviews,
);
