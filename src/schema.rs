// Kept in sync with DieselDbContext::init_schema.

diesel::table! {
    reviews (id) {
        id -> Integer,
        text -> Text,
        advantages -> Nullable<Text>,
        disadvantages -> Nullable<Text>,
        published_at -> Text,
        image -> Nullable<Text>,
        first_response_text -> Nullable<Text>,
        text_id -> Text,
    }
}
