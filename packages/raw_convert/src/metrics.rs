use nm::Event;

thread_local! {
    /// Column values that could not be converted and were replaced by the default value.
    pub(crate) static PARSE_FAILURES: Event = Event::builder()
        .name("raw_convert_parse_failures")
        .build();
}
