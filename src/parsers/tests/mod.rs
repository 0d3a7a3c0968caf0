mod html_extractor_tests;
