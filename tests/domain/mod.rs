mod audio_quality_test;
