diesel::table! {
    notes (id) {
        id -> Varchar,
        ciphertext -> Text,
        iv -> Varchar,
        salt -> Nullable<Varchar>,
        delete_token -> Varchar,
        created_at -> Timestamp,
        expires_at -> Timestamp,
    }
}
