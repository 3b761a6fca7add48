diesel::table! {
    users (id) {
        id -> Uuid,
        name -> Text,
        email -> Text,
        password -> Text,
        phone -> Text,
        address -> Nullable<Text>,
        role -> Text,
        restaurant_name -> Nullable<Text>,
        restaurant_address -> Nullable<Text>,
        license_plate -> Nullable<Text>,
        photo -> Nullable<Text>,
        latlong -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    access_tokens (token) {
        token -> Text,
        user_id -> Uuid,
        created_at -> Timestamp,
    }
}

diesel::table! {
    products (id) {
        id -> Uuid,
        name -> Text,
        description -> Text,
        price -> Int8,
        stock -> Int8,
        is_available -> Bool,
        is_favorite -> Bool,
        image -> Nullable<Text>,
        user_id -> Uuid,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(access_tokens -> users (user_id));
diesel::joinable!(products -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(access_tokens, products, users);
