mod helpers;

mod bloom_tests;
