use mediacodec_macros::SymbolTable;

use crate::ffi;

/// Entry points of `libmediandk.so` used by a session.
///
/// Everything is required except `AMediaCodec_setOutputSurface`, which only
/// exists from API level 23.
#[derive(SymbolTable)]
pub(crate) struct NdkSymbols {
    #[symbol(name = "AMediaCodec_createCodecByName")]
    pub create_codec_by_name: ffi::AMediaCodec_createCodecByName,
    #[symbol(name = "AMediaCodec_configure")]
    pub configure: ffi::AMediaCodec_configure,
    #[symbol(name = "AMediaCodec_start")]
    pub start: ffi::AMediaCodec_start,
    #[symbol(name = "AMediaCodec_stop")]
    pub stop: ffi::AMediaCodec_stop,
    #[symbol(name = "AMediaCodec_flush")]
    pub flush: ffi::AMediaCodec_flush,
    #[symbol(name = "AMediaCodec_delete")]
    pub delete: ffi::AMediaCodec_delete,
    #[symbol(name = "AMediaCodec_getOutputFormat")]
    pub get_output_format: ffi::AMediaCodec_getOutputFormat,
    #[symbol(name = "AMediaCodec_dequeueInputBuffer")]
    pub dequeue_input_buffer: ffi::AMediaCodec_dequeueInputBuffer,
    #[symbol(name = "AMediaCodec_getInputBuffer")]
    pub get_input_buffer: ffi::AMediaCodec_getInputBuffer,
    #[symbol(name = "AMediaCodec_queueInputBuffer")]
    pub queue_input_buffer: ffi::AMediaCodec_queueInputBuffer,
    #[symbol(name = "AMediaCodec_dequeueOutputBuffer")]
    pub dequeue_output_buffer: ffi::AMediaCodec_dequeueOutputBuffer,
    #[symbol(name = "AMediaCodec_getOutputBuffer")]
    pub get_output_buffer: ffi::AMediaCodec_getOutputBuffer,
    #[symbol(name = "AMediaCodec_releaseOutputBuffer")]
    pub release_output_buffer: ffi::AMediaCodec_releaseOutputBuffer,
    #[symbol(name = "AMediaCodec_setOutputSurface")]
    pub set_output_surface: Option<ffi::AMediaCodec_setOutputSurface>,

    #[symbol(name = "AMediaFormat_new")]
    pub format_new: ffi::AMediaFormat_new,
    #[symbol(name = "AMediaFormat_delete")]
    pub format_delete: ffi::AMediaFormat_delete,
    #[symbol(name = "AMediaFormat_setString")]
    pub format_set_string: ffi::AMediaFormat_setString,
    #[symbol(name = "AMediaFormat_setInt32")]
    pub format_set_int32: ffi::AMediaFormat_setInt32,
    #[symbol(name = "AMediaFormat_getInt32")]
    pub format_get_int32: ffi::AMediaFormat_getInt32,
}

#[test]
fn declared_entry_points() {
    use crate::resolve::SymbolTable;

    let entries = NdkSymbols::ENTRY_POINTS;
    assert_eq!(entries.len(), 19);
    assert_eq!(entries[0].name, "AMediaCodec_createCodecByName");
    assert_eq!(entries.iter().filter(|e| !e.required).count(), 1);
    assert!(
        entries
            .iter()
            .any(|e| e.name == "AMediaCodec_setOutputSurface" && !e.required)
    );
}
